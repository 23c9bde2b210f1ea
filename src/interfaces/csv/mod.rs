pub mod tariff_writer;
