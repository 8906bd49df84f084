pub mod prelude;

pub mod comics;
