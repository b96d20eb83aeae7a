mod recorder;
mod support;
