//! Names the obfuscator must never rename because the runtime provides them.

use std::collections::HashSet;

/// Lua reserved words (5.1 - 5.4), plus the `<const>`/`<close>` attributes.
pub const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while", "const",
    "close",
];

/// Keywords that are also expressions and can be read through a table.
pub const VALUE_KEYWORDS: &[&str] = &["true", "false", "nil"];

/// Globals provided by the stock runtimes.
pub const RUNTIME_GLOBALS: &[&str] = &[
    "_G", "_ENV", "_VERSION", "arg", "assert", "bit32", "collectgarbage", "coroutine", "debug",
    "dofile", "error", "gcinfo", "getfenv", "getmetatable", "io", "ipairs", "load", "loadfile",
    "loadstring", "math", "module", "newproxy", "next", "os", "package", "pairs", "pcall", "print",
    "rawequal", "rawget", "rawlen", "rawset", "require", "select", "setfenv", "setmetatable",
    "string", "table", "tonumber", "tostring", "type", "unpack", "utf8", "xpcall", "jit", "bit",
];

/// Members of the standard library tables, fields of the tables the runtime
/// builds or reads, metamethod names and implicit names.
///
/// Renaming is a whole-program substitution, so a user local named `insert`
/// would otherwise also rewrite `table.insert`.
pub const LIBRARY_MEMBERS: &[&str] = &[
    // implicit
    "self", "n",
    // coroutine
    "create", "isyieldable", "resume", "running", "status", "wrap", "yield",
    // debug
    "gethook", "getinfo", "getlocal", "getregistry", "getupvalue", "getuservalue", "sethook",
    "setlocal", "setupvalue", "setuservalue", "traceback", "upvalueid", "upvaluejoin",
    "setcstacklimit",
    // io / file
    "close", "flush", "input", "lines", "open", "output", "popen", "read", "seek", "setvbuf",
    "stderr", "stdin", "stdout", "tmpfile", "write",
    // math
    "abs", "acos", "asin", "atan", "atan2", "ceil", "cos", "cosh", "deg", "exp", "floor", "fmod",
    "frexp", "huge", "ldexp", "log", "log10", "max", "maxinteger", "min", "mininteger", "modf",
    "pi", "pow", "rad", "random", "randomseed", "sin", "sinh", "sqrt", "tan", "tanh", "tointeger",
    "ult",
    // os
    "clock", "date", "difftime", "execute", "exit", "getenv", "remove", "rename", "setlocale",
    "time", "tmpname",
    // package
    "config", "cpath", "loaded", "loaders", "loadlib", "path", "preload", "searchers",
    "searchpath", "seeall",
    // string
    "byte", "char", "dump", "find", "format", "gmatch", "gsub", "len", "lower", "match", "rep",
    "reverse", "sub", "upper", "pack", "packsize", "unpack",
    // table
    "concat", "insert", "maxn", "move", "sort",
    // utf8
    "charpattern", "codepoint", "codes", "offset",
    // bit32 / bit
    "arshift", "band", "bnot", "bor", "btest", "bxor", "extract", "lrotate", "lshift", "replace",
    "rrotate", "rshift", "tobit", "tohex", "rol", "ror", "bswap",
    // os.date("*t") / os.time fields
    "year", "month", "day", "hour", "sec", "wday", "yday", "isdst",
    // debug.getinfo fields
    "source", "short_src", "currentline", "linedefined", "lastlinedefined", "what", "name",
    "namewhat", "nups", "nparams", "isvararg", "istailcall", "func", "activelines", "ftransfer",
    "ntransfer",
    // metamethods
    "__index", "__newindex", "__call", "__add", "__sub", "__mul", "__div", "__mod", "__pow",
    "__unm", "__idiv", "__band", "__bor", "__bxor", "__shl", "__shr", "__bnot", "__concat",
    "__len", "__eq", "__lt", "__le", "__tostring", "__gc", "__mode", "__close", "__metatable",
    "__name", "__pairs", "__ipairs",
];

/// The fixed set of names renaming must leave alone.
///
/// Built once per pipeline configuration and shared read-only between runs.
#[derive(Debug, Clone)]
pub struct ReservedSet {
    names: HashSet<String>,
    globals: HashSet<String>,
}

impl ReservedSet {
    /// Keywords, runtime globals and standard library members of Lua.
    pub fn lua() -> Self {
        let globals: HashSet<String> = RUNTIME_GLOBALS.iter().map(|s| s.to_string()).collect();
        let names = KEYWORDS
            .iter()
            .chain(LIBRARY_MEMBERS)
            .map(|s| s.to_string())
            .chain(globals.iter().cloned())
            .collect();
        Self { names, globals }
    }

    /// Adds host-specific names (for example an embedding API) to the set.
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Adds host-provided globals; they are reserved and eligible for indirection.
    pub fn with_globals<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in extra {
            let name = name.into();
            self.names.insert(name.clone());
            self.globals.insert(name);
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// True if `name` resolves through the runtime's global namespace.
    pub fn is_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ReservedSet {
    fn default() -> Self {
        Self::lua()
    }
}
