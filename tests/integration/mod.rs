mod assembler;
mod card_parsing;
mod test_utils;
mod workflow_pipeline;
