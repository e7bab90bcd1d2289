pub mod helpers;
mod mocks;
mod orders;
mod webhook;
