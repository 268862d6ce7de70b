pub mod output_planner;
