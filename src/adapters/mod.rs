//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements          | Connects to                  |
//! |------------------|---------------------|------------------------------|
//! | `log_sink`       | EventSink           | `log` facade / serial output |
//! | `message_bridge` | GlucoseSensorPort   | CGM JSON messages            |
//! |                  | PumpPort            | pump JSON commands           |

pub mod log_sink;
pub mod message_bridge;
