mod runtime;

mod test_bench;
mod test_data;
