//! Contact representation and the generators that detect contacts each step.

pub mod contact;
pub mod generators;
pub mod ground;
pub mod pairs;
pub mod platform;

pub use contact::ParticleContact;
pub use generators::{ContactGenerator, GeneratesContacts};
pub use ground::GroundContactGenerator;
pub use pairs::ParticlePairContactGenerator;
pub use platform::{Platform, PlatformContactGenerator};
