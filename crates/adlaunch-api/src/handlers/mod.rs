pub mod health;
pub mod launch_ads;
