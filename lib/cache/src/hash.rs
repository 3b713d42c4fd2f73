use md5::{Digest, Md5};

/// The cache key of a query: the hex encoded MD5 digest of its text.
pub fn hash_query(query: &str) -> String {
    hex::encode(Md5::digest(query.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_hex_digest() {
        assert_eq!(hash_query(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            hash_query("SELECT * WHERE {?s ?p ?o} LIMIT 10"),
            hash_query("SELECT * WHERE {?s ?p ?o} LIMIT 10")
        );
        assert_ne!(hash_query("ASK {}"), hash_query("ASK { }"));
    }
}
