pub use super::comics::Entity as Comics;
