pub mod refresh_cycle_sync;
