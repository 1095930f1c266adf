mod helpers;

mod cli;
mod lockfile_flow;
mod pipeline;
