mod session;
mod state;
