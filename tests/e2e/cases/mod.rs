mod addresses;
mod bundle;
mod position;
mod simulation;
