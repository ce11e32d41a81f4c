pub mod segments; 
pub mod parser; 
pub mod pattern; 

pub use self::segments::{Url, dangling_url}; 
pub use self::pattern::{PathPattern, path_pattern_creator::*}; 

