// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Textual port references used in blueprint connections.
//!
//! ```text
//! in-ref   := "(" head path
//! out-ref  := head ")" path
//! head     := [instance] ["@" service | "#" delegate]
//! path     := { "." name | "~" }
//! ```
//!
//! An empty instance means the blueprint itself; no service or delegate means
//! `main`. Right after `)` the first field name may omit its dot, so
//! `fork)true` and `fork).true` are the same reference.
//!
//! | reference              | port                                         |
//! |------------------------|----------------------------------------------|
//! | `(`                    | own main input                               |
//! | `)`                    | own main output                              |
//! | `(agg`                 | main input of child `agg`                    |
//! | `agg#iteration)~.item` | field `item` of the elements sent by `agg`'s `iteration` delegate |
//! | `(~.select`            | field `select` of the elements of own main input |

use crate::config::consts::MAIN_SERVICE;
use crate::engine::Direction;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Service(String),
    Delegate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRef {
    /// Child instance name, empty for the blueprint itself.
    pub instance: String,
    pub target: Target,
    pub direction: Direction,
    pub path: Vec<Segment>,
}

/// Where a reference is used within a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
}

impl PortRef {
    pub fn is_own(&self) -> bool {
        self.instance.is_empty()
    }

    /// Sources are a child's output or the blueprint's own input;
    /// destinations are the reverse.
    pub fn check_role(&self, role: Role) -> Result<(), String> {
        let valid = match (role, self.is_own(), self.direction) {
            (Role::Source, true, Direction::In) | (Role::Source, false, Direction::Out) => true,
            (Role::Destination, true, Direction::Out)
            | (Role::Destination, false, Direction::In) => true,
            _ => false,
        };
        if valid {
            return Ok(());
        }
        let owner = if self.is_own() { "own" } else { "a child's" };
        let side = match self.direction {
            Direction::In => "input",
            Direction::Out => "output",
        };
        let role = match role {
            Role::Source => "source",
            Role::Destination => "destination",
        };
        Err(format!("{owner} {side} cannot be a connection {role}"))
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || "().~@#".contains(c))
}

fn parse_head(head: &str) -> Result<(String, Target), String> {
    let (instance, target) = match (head.find('@'), head.find('#')) {
        (Some(_), Some(_)) => return Err("cannot name both a service and a delegate".to_string()),
        (Some(at), None) => (&head[..at], Target::Service(head[at + 1..].to_string())),
        (None, Some(at)) => (&head[..at], Target::Delegate(head[at + 1..].to_string())),
        (None, None) => (head, Target::Service(MAIN_SERVICE.to_string())),
    };
    if !instance.is_empty() && !valid_name(instance) {
        return Err(format!("invalid instance name '{instance}'"));
    }
    match &target {
        Target::Service(name) | Target::Delegate(name) if !valid_name(name) => {
            Err(format!("invalid service or delegate name '{name}'"))
        }
        _ => Ok((instance.to_string(), target)),
    }
}

fn parse_path(text: &str, implicit_dot: bool) -> Result<Vec<Segment>, String> {
    let mut path = Vec::new();
    let mut rest = text;
    if implicit_dot && !rest.is_empty() && !rest.starts_with(['.', '~']) {
        let end = rest.find(['.', '~']).unwrap_or(rest.len());
        path.push(Segment::Field(rest[..end].to_string()));
        rest = &rest[end..];
    }
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('~') {
            path.push(Segment::Stream);
            rest = after;
        } else if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', '~']).unwrap_or(after.len());
            path.push(Segment::Field(after[..end].to_string()));
            rest = &after[end..];
        } else {
            return Err(format!("unexpected '{rest}' in path"));
        }
    }
    for segment in &path {
        if let Segment::Field(name) = segment {
            if !valid_name(name) {
                return Err(format!("invalid field name '{name}'"));
            }
        }
    }
    Ok(path)
}

impl FromStr for PortRef {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let opens = text.matches('(').count();
        let closes = text.matches(')').count();

        let (head, path, direction, implicit_dot) = match (opens, closes) {
            (1, 0) => {
                let body = text
                    .strip_prefix('(')
                    .ok_or_else(|| "'(' must start an input reference".to_string())?;
                let end = body.find(['.', '~']).unwrap_or(body.len());
                (&body[..end], &body[end..], Direction::In, false)
            }
            (0, 1) => {
                let at = text.find(')').unwrap_or(text.len());
                (&text[..at], &text[at + 1..], Direction::Out, true)
            }
            _ => return Err("expected exactly one '(' or one ')'".to_string()),
        };

        let (instance, target) = parse_head(head)?;
        Ok(PortRef {
            instance,
            target,
            direction,
            path: parse_path(path, implicit_dot)?,
        })
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction == Direction::In {
            write!(f, "(")?;
        }
        write!(f, "{}", self.instance)?;
        match &self.target {
            Target::Service(name) if name == MAIN_SERVICE => {}
            Target::Service(name) => write!(f, "@{name}")?,
            Target::Delegate(name) => write!(f, "#{name}")?,
        }
        if self.direction == Direction::Out {
            write!(f, ")")?;
        }
        for segment in &self.path {
            match segment {
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Stream => write!(f, "~")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> PortRef {
        text.parse().unwrap_or_else(|e| panic!("'{}' failed: {}", text, e))
    }

    #[test]
    fn parse_valid_references() {
        struct Case {
            text: &'static str,
            instance: &'static str,
            target: Target,
            direction: Direction,
            path: Vec<Segment>,
        }

        let main = || Target::Service(MAIN_SERVICE.to_string());
        let cases = vec![
            Case {
                text: "(",
                instance: "",
                target: main(),
                direction: Direction::In,
                path: vec![],
            },
            Case {
                text: ")",
                instance: "",
                target: main(),
                direction: Direction::Out,
                path: vec![],
            },
            Case {
                text: "(agg",
                instance: "agg",
                target: main(),
                direction: Direction::In,
                path: vec![],
            },
            Case {
                text: "agg#iteration)~.item",
                instance: "agg",
                target: Target::Delegate("iteration".into()),
                direction: Direction::Out,
                path: vec![Segment::Stream, Segment::Field("item".into())],
            },
            Case {
                text: "(agg#iteration~",
                instance: "agg",
                target: Target::Delegate("iteration".into()),
                direction: Direction::In,
                path: vec![Segment::Stream],
            },
            Case {
                text: "fork)true",
                instance: "fork",
                target: main(),
                direction: Direction::Out,
                path: vec![Segment::Field("true".into())],
            },
            Case {
                text: "(~.select",
                instance: "",
                target: main(),
                direction: Direction::In,
                path: vec![Segment::Stream, Segment::Field("select".into())],
            },
            Case {
                text: "(calc@reset.flag",
                instance: "calc",
                target: Target::Service("reset".into()),
                direction: Direction::In,
                path: vec![Segment::Field("flag".into())],
            },
        ];

        for case in cases {
            let parsed = parse(case.text);
            assert_eq!(parsed.instance, case.instance, "{}", case.text);
            assert_eq!(parsed.target, case.target, "{}", case.text);
            assert_eq!(parsed.direction, case.direction, "{}", case.text);
            assert_eq!(parsed.path, case.path, "{}", case.text);
        }
    }

    #[test]
    fn parse_rejects_malformed_references() {
        let cases = vec![
            "agg",
            "(agg)",
            "((agg",
            "agg(",
            "(a@b#c",
            "(agg..x",
            "agg)~~.",
            "(agg@",
            "(agg.x y",
        ];
        for text in cases {
            assert!(text.parse::<PortRef>().is_err(), "'{}' should fail", text);
        }
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(parse("fork)true").to_string(), "fork).true");
        assert_eq!(parse("(agg#iteration~").to_string(), "(agg#iteration~");
        assert_eq!(parse("(@main").to_string(), "(");
    }

    #[test]
    fn roles() {
        assert!(parse("(").check_role(Role::Source).is_ok());
        assert!(parse(")").check_role(Role::Destination).is_ok());
        assert!(parse("agg)").check_role(Role::Source).is_ok());
        assert!(parse("(agg").check_role(Role::Destination).is_ok());

        assert!(parse(")").check_role(Role::Source).is_err());
        assert!(parse("(").check_role(Role::Destination).is_err());
        assert!(parse("(agg").check_role(Role::Source).is_err());
        assert!(parse("agg)").check_role(Role::Destination).is_err());
    }
}
