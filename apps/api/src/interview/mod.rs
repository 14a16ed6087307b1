pub mod coach;
pub mod fallback;
pub mod handlers;
pub mod lifecycle;
pub mod prompts;
pub mod report_builder;
pub mod resume;
pub mod store;

#[cfg(test)]
pub mod testing;
