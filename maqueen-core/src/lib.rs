//! Motion control and sensing for the DFRobot Maqueen on no-std embedded
//! platforms.
//!
//! For a host-side demo, see the `mock-mcu` application.
#![no_std]

pub mod utils;
