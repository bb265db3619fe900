mod pauses;
mod sessions;
