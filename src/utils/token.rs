use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Credentials mailed to a user when an admin approves the account.
pub fn generate_login() -> String {
    let letters: Vec<char> = ('a'..='z').chain('A'..='Z').collect();
    let mut rng = thread_rng();
    (0..7)
        .map(|_| letters[rng.gen_range(0..letters.len())])
        .collect()
}

pub fn generate_password(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_is_seven_ascii_letters() {
        let login = generate_login();
        assert_eq!(login.len(), 7);
        assert!(login.chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn password_is_alphanumeric() {
        let password = generate_password(7);
        assert_eq!(password.len(), 7);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
