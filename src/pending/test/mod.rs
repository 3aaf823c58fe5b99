mod scenario;

mod faults;
mod teardown;
