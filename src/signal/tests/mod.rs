mod connection;
mod raise;
