mod address;
mod tests;
