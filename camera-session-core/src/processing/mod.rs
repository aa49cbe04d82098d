pub mod frame_clock;
