pub mod reference_data;
