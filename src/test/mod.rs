mod cases;
mod forwarder;
mod peer;
mod queues;
