mod parser_robustness_tests;
mod projection_pipeline_tests;
