mod aggregation;
mod common;
mod grades;
