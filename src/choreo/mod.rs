pub mod component;
pub mod labels;
pub mod master;
pub mod profile;
pub mod registry;
