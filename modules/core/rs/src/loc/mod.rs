pub use segment::Segment;

mod segment;
