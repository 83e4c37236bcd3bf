//! Rule catalogs, one module per guideline standard

pub mod cobidas;
