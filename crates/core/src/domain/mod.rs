pub mod intent;
pub mod verse;
