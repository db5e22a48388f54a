pub mod id_factory;
