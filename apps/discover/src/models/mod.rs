pub mod goods;
pub mod pet;
