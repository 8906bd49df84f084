pub mod comics;
