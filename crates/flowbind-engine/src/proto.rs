//! Generated protobuf types and gRPC stubs for `firmament.FirmamentScheduler`.
//!
//! Built from `proto/firmament_scheduler.proto`. Field tags and enum
//! values must stay in step with the engine's own definitions.

tonic::include_proto!("firmament");
