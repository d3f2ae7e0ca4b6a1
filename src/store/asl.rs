// System log store backed by libsystem_asl

use super::{LogStore, Token};
use std::ffi::{c_char, c_int, c_void, CStr};
use std::ptr;

#[allow(non_camel_case_types)]
type asl_object_t = *mut c_void;

const ASL_TYPE_QUERY: u32 = 1;

extern "C" {
    fn asl_open(ident: *const c_char, facility: *const c_char, opts: u32) -> asl_object_t;
    fn asl_new(kind: u32) -> asl_object_t;
    fn asl_set_query(
        msg: asl_object_t,
        key: *const c_char,
        value: *const c_char,
        op: u32,
    ) -> c_int;
    fn asl_search(client: asl_object_t, query: asl_object_t) -> asl_object_t;
    fn asl_next(obj: asl_object_t) -> asl_object_t;
    fn asl_key(msg: asl_object_t, n: u32) -> *const c_char;
    fn asl_get(msg: asl_object_t, key: *const c_char) -> *const c_char;
    fn asl_close(obj: asl_object_t);
    fn asl_release(obj: asl_object_t);
    fn asl_free(obj: asl_object_t);
}

fn to_token(obj: asl_object_t) -> Option<Token> {
    Token::new(obj as usize)
}

fn to_object(token: Token) -> asl_object_t {
    token.as_raw() as asl_object_t
}

fn opt_ptr(s: Option<&CStr>) -> *const c_char {
    s.map_or(ptr::null(), CStr::as_ptr)
}

/// Copy a string owned by the library before the owning object goes away
///
/// # Safety
/// `raw` must be null or point to a NUL-terminated string.
unsafe fn copy_string(raw: *const c_char) -> Option<String> {
    if raw.is_null() {
        None
    } else {
        Some(CStr::from_ptr(raw).to_string_lossy().into_owned())
    }
}

/// The Apple System Log store.
///
/// Tokens are raw `asl_object_t` pointers. Every call below hands the
/// library a token it minted itself; using a token after teardown is left to
/// the library's own contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct AslStore;

impl AslStore {
    pub fn new() -> Self {
        Self
    }
}

impl LogStore for AslStore {
    fn open(&self, ident: Option<&CStr>, facility: Option<&CStr>, options: u32) -> Option<Token> {
        // SAFETY: both strings are null or NUL-terminated and outlive the call.
        to_token(unsafe { asl_open(opt_ptr(ident), opt_ptr(facility), options) })
    }

    fn new_query(&self) -> Option<Token> {
        // SAFETY: plain allocation call.
        to_token(unsafe { asl_new(ASL_TYPE_QUERY) })
    }

    fn set_query(&self, query: Token, key: &CStr, value: Option<&CStr>, op: u32) {
        // SAFETY: the library copies key and value into the query.
        unsafe {
            asl_set_query(to_object(query), key.as_ptr(), opt_ptr(value), op);
        }
    }

    fn search(&self, client: Token, query: Token) -> Option<Token> {
        // SAFETY: both tokens were minted by this library.
        to_token(unsafe { asl_search(to_object(client), to_object(query)) })
    }

    fn next(&self, response: Token) -> Option<Token> {
        // SAFETY: response token was minted by asl_search.
        to_token(unsafe { asl_next(to_object(response)) })
    }

    fn key(&self, message: Token, index: u32) -> Option<String> {
        // SAFETY: the returned string lives as long as the message; it is
        // copied before returning.
        unsafe { copy_string(asl_key(to_object(message), index)) }
    }

    fn get(&self, message: Token, key: &CStr) -> Option<String> {
        // SAFETY: as for `key`.
        unsafe { copy_string(asl_get(to_object(message), key.as_ptr())) }
    }

    fn close(&self, token: Token) {
        // SAFETY: token was minted by asl_open.
        unsafe { asl_close(to_object(token)) }
    }

    fn release(&self, token: Token) {
        // SAFETY: token was minted by this library.
        unsafe { asl_release(to_object(token)) }
    }

    fn free(&self, token: Token) {
        // SAFETY: token was minted by this library.
        unsafe { asl_free(to_object(token)) }
    }
}
