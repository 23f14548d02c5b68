//! Architectural CPU state model primitives.

/// Register file and register naming.
pub mod registers;

pub use registers::{
    register_name, RegisterFile, GENERAL_REGISTER_COUNT, REGISTER_NAMES, RETURN_ADDRESS_REGISTER,
    ZERO_REGISTER,
};
