//! Data models for PetWalker API entities.
//!
//! The session core only needs the authenticated user's profile; domain
//! resources (dogs, walks, trainings) are fetched by the screens through the
//! generic `ApiClient` helpers with their own local types.

pub mod user;

pub use user::UserProfile;
