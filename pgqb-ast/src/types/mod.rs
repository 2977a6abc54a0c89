mod data_type;

pub use self::data_type::DataType;
