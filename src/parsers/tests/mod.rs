mod dom_scanner_tests;
mod json_walker_tests;
