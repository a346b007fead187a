//! Shared primitive types.
use alloy::primitives::Uint;

mod call;
pub use call::*;

mod contracts;
pub use contracts::*;

mod decoded;
pub use decoded::*;

mod deployments;
pub use deployments::*;

mod multisend;
pub use multisend::*;

mod policy;
pub use policy::*;

mod sign_request;
pub use sign_request::*;

mod transaction;
pub use transaction::*;

mod user_op;
pub use user_op::*;

/// A 48 bit integer.
pub type U48 = Uint<48, 1>;
