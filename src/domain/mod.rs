//! Domain types, the onboarding state machine and the ports to external collaborators.

pub mod cost;
pub mod fees;
pub mod merchant;
pub mod notification;
pub mod ports;
pub mod status;
pub mod tariff;
