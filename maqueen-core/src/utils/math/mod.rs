//! Math utilities for the Maqueen robot.
//!
//! This module provides differential-drive kinematics and open-loop timing.

pub mod kinematics;
