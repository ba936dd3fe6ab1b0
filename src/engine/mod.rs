pub mod builder;
pub mod compiler;
pub mod marker;
pub mod network;
pub mod operator;
pub mod port;
pub mod runtime;

pub use builder::{build, Built};
pub use marker::{Item, Marker, MarkerKind, StreamId};
pub use network::{Boundary, Direction, Network, OperatorId, OperatorKind, PortId, PortPair};
pub use operator::{Delegate, Operator, Service};
pub use port::Port;
pub use runtime::{Runtime, WorkerFailure};
