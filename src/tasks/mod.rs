pub mod control_loop;
pub mod telemetry_task;
