pub mod frozen_lake;
