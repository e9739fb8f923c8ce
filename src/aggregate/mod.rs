pub mod chart;
pub mod sentiment;
pub mod timefmt;
pub mod trends;
