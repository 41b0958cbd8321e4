pub mod tokenized_position;
