pub mod results_parser;
