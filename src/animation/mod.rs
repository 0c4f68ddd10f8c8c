pub mod ease;
pub mod plan;
pub mod playhead;
pub mod props;
pub mod timeline;
