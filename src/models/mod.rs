pub mod congregation;
pub mod directory;
pub mod entity;
pub mod field_service;
pub mod group;
pub mod permission;
pub mod public_talk;
pub mod publisher;
pub mod relation;
pub mod setting;
pub mod visitor;
pub mod week;
